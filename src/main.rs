use reelmix::adapters::ffmpeg::FfmpegTranscoder;
use reelmix::adapters::http::{router, AppState, FormDefaults};
use reelmix::application::batch::BatchRunner;
use reelmix::application::orchestrator::{PipelineOrchestrator, PipelineSettings};
use reelmix::AppConfig;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let transcoder = Arc::new(FfmpegTranscoder::new(
        config.ffmpeg_path.clone(),
        config.ffprobe_path.clone(),
        config.video_codec.clone(),
        config.transcode_timeout,
    ));

    let mut settings = PipelineSettings::new(config.work_dir.clone(), config.output_dir.clone());
    settings.extract_concurrency = config.extract_concurrency;

    let orchestrator = Arc::new(PipelineOrchestrator::new(transcoder, settings));
    let runner = BatchRunner::new(orchestrator, config.root_dir_video.clone(), config.batch_delay);

    let app = router(AppState {
        runner: Arc::new(runner),
        defaults: FormDefaults {
            segment_duration: config.default_segment_duration,
            segment_count: config.default_segment_count,
        },
        jobs: Arc::new(Semaphore::new(config.max_concurrent_jobs)),
    });

    let bind = format!("{}:{}", config.addr, config.port);
    let listener = match tokio::net::TcpListener::bind(&bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(address = %bind, error = %e, "failed to bind TCP listener");
            std::process::exit(1);
        }
    };

    info!(
        address = %bind,
        videos = %config.root_dir_video.display(),
        output = %config.output_dir.display(),
        "listening"
    );
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}

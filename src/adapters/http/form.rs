use super::{AppState, FormDefaults};
use crate::application::batch::{BatchRequest, VideoOutcome};
use crate::ports::TranscodeExecutor;
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};

/// JSON body accepted by `/api/process`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub video_names: Vec<String>,
    pub segment_longtime: Option<f64>,
    pub segment_number: Option<i64>,
}

pub async fn index<T>(State(state): State<AppState<T>>) -> Html<String>
where
    T: TranscodeExecutor + 'static,
{
    let root = state.runner.source_root();
    let files = match list_videos(root).await {
        Ok(files) => files,
        Err(e) => {
            warn!(path = %root.display(), error = %e, "could not list video directory");
            Vec::new()
        }
    };

    let file_list = files
        .iter()
        .map(|file| {
            let name = escape_html(file);
            format!(
                r#"<li><label><input type="checkbox" name="videoNames" value="{0}"> {0}</label></li>"#,
                name
            )
        })
        .collect::<String>();

    Html(format!(
        r#"
        <!doctype html>
        <html>
            <head>
                <title>Random clip remix</title>
            </head>
            <body>
                <h1>Videos in {root}</h1>
                <form action="/process" method="post">
                    <ul>{files}</ul>
                    <div>
                        <label>
                            Other video names (one per line):
                            <textarea name="videoNames" rows="4" cols="40"></textarea>
                        </label>
                    </div>
                    <div>
                        <label>
                            Segment duration (seconds):
                            <input type="number" name="segmentLongtime" step="0.1" min="0.1" value="{duration}">
                        </label>
                    </div>
                    <div>
                        <label>
                            Number of segments:
                            <input type="number" name="segmentNumber" min="1" value="{count}">
                        </label>
                    </div>
                    <div>
                        <input type="submit" value="Process videos">
                    </div>
                </form>
            </body>
        </html>
        "#,
        root = escape_html(&root.display().to_string()),
        files = file_list,
        duration = state.defaults.segment_duration,
        count = state.defaults.segment_count,
    ))
}

pub async fn success() -> Html<&'static str> {
    Html(
        r#"
        <!doctype html>
        <html>
            <head><title>Done</title></head>
            <body>
                <h1>All videos processed.</h1>
                <a href="/">Process more</a>
            </body>
        </html>
        "#,
    )
}

/// Handle the urlencoded form. Checkbox values and textarea lines both
/// arrive as `videoNames`, so the fields are read as raw pairs.
pub async fn process<T>(
    State(state): State<AppState<T>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response
where
    T: TranscodeExecutor + 'static,
{
    let request = match parse_form(&fields, state.defaults) {
        Ok(request) => request,
        Err(message) => return (StatusCode::BAD_REQUEST, message).into_response(),
    };

    let outcomes = run_batch(&state, &request).await;
    if outcomes.iter().all(VideoOutcome::succeeded) {
        Redirect::to("/success").into_response()
    } else {
        Html(render_report(&outcomes)).into_response()
    }
}

pub async fn process_json<T>(
    State(state): State<AppState<T>>,
    Json(body): Json<ProcessRequest>,
) -> Response
where
    T: TranscodeExecutor + 'static,
{
    let video_names: Vec<String> = body
        .video_names
        .iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    if video_names.is_empty() {
        return (StatusCode::BAD_REQUEST, "no video names given").into_response();
    }

    let request = BatchRequest {
        video_names,
        segment_duration: body
            .segment_longtime
            .unwrap_or(state.defaults.segment_duration),
        segment_count: body
            .segment_number
            .map(clamp_count)
            .unwrap_or(state.defaults.segment_count),
    };
    Json(run_batch(&state, &request).await).into_response()
}

async fn run_batch<T>(state: &AppState<T>, request: &BatchRequest) -> Vec<VideoOutcome>
where
    T: TranscodeExecutor + 'static,
{
    // The semaphore is never closed.
    let _permit = state.jobs.acquire().await.ok();
    info!(
        videos = request.video_names.len(),
        segment_duration = request.segment_duration,
        segment_count = request.segment_count,
        "processing batch"
    );
    state.runner.run(request).await
}

pub fn parse_form(fields: &[(String, String)], defaults: FormDefaults) -> Result<BatchRequest, String> {
    let mut video_names = Vec::new();
    let mut segment_duration = defaults.segment_duration;
    let mut segment_count = defaults.segment_count;

    for (key, value) in fields {
        let value = value.trim();
        match key.as_str() {
            "videoNames" => video_names.extend(
                value
                    .lines()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(String::from),
            ),
            "segmentLongtime" if !value.is_empty() => {
                segment_duration = value
                    .parse::<f64>()
                    .map_err(|_| format!("segmentLongtime is not a number: {:?}", value))?;
            }
            "segmentNumber" if !value.is_empty() => {
                segment_count = value
                    .parse::<i64>()
                    .map(clamp_count)
                    .map_err(|_| format!("segmentNumber is not an integer: {:?}", value))?;
            }
            _ => {}
        }
    }

    if video_names.is_empty() {
        return Err("no video names given".to_string());
    }
    Ok(BatchRequest {
        video_names,
        segment_duration,
        segment_count,
    })
}

/// Negative counts plan nothing, same as zero.
fn clamp_count(count: i64) -> usize {
    usize::try_from(count).unwrap_or(0)
}

async fn list_videos(root: &std::path::Path) -> std::io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(root).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            if let Some(name) = entry.file_name().to_str() {
                files.push(name.to_string());
            }
        }
    }
    files.sort();
    Ok(files)
}

fn render_report(outcomes: &[VideoOutcome]) -> String {
    let rows = outcomes
        .iter()
        .map(|o| {
            let detail = match (&o.output, &o.error) {
                (Some(path), _) => escape_html(&path.display().to_string()),
                (None, Some(error)) => format!(
                    "{}: {}",
                    o.error_kind.as_deref().unwrap_or("Error"),
                    escape_html(error)
                ),
                (None, None) => String::new(),
            };
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&o.video),
                o.state,
                detail
            )
        })
        .collect::<String>();

    format!(
        r#"
        <!doctype html>
        <html>
            <head><title>Batch report</title></head>
            <body>
                <h1>Some videos could not be processed</h1>
                <table>
                    <tr><th>Video</th><th>State</th><th>Output / error</th></tr>
                    {}
                </table>
                <a href="/">Back</a>
            </body>
        </html>
        "#,
        rows
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

//! 基于 yt-dlp 子进程的解析器实现
//!
//! 元数据：`--dump-single-json` 一次性读取 stdout。
//! 下载：通过 `--progress-template` 与 `--print` 让 yt-dlp 输出带标记的行，
//! 逐行解析 stdout/stderr 并转换为 [`ProgressEvent`]。

use super::{
    DownloadOptions, ExtractorError, MediaExtractor, ProgressCallback, ProgressEvent, VideoInfo,
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// 进度行标记
const PROGRESS_MARKER: &str = "YTJ_PROGRESS|";
/// 信息行标记
const INFO_MARKER: &str = "YTJ_INFO|";

/// 进度模板：状态|已下载|总大小|文件名（文件名放最后，可能包含分隔符）
const PROGRESS_TEMPLATE: &str = "download:YTJ_PROGRESS|%(progress.status)s|%(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.filename)s";
/// 文件移动到最终位置后输出完整信息 JSON
const INFO_TEMPLATE: &str = "after_move:YTJ_INFO|%()j";

/// yt-dlp 输出行解析结果
#[derive(Debug, Clone, PartialEq)]
pub enum OutputLine {
    Progress {
        status: String,
        downloaded_bytes: Option<u64>,
        total_bytes: Option<u64>,
        filename: Option<String>,
    },
    Info(String),
    Other(String),
}

/// 解析一行 yt-dlp 输出
pub fn parse_output_line(line: &str) -> OutputLine {
    let line = line.trim_end_matches(['\r', '\n']);

    if let Some(rest) = line.strip_prefix(PROGRESS_MARKER) {
        let mut parts = rest.splitn(4, '|');
        let status = parts.next().unwrap_or_default().to_string();
        let downloaded_bytes = parts.next().and_then(parse_number);
        let total_bytes = parts.next().and_then(parse_number);
        let filename = parts.next().and_then(template_value).map(str::to_string);
        return OutputLine::Progress {
            status,
            downloaded_bytes,
            total_bytes,
            filename,
        };
    }

    if let Some(json) = line.strip_prefix(INFO_MARKER) {
        return OutputLine::Info(json.to_string());
    }

    OutputLine::Other(line.to_string())
}

/// yt-dlp 模板中缺失的字段输出为 `NA`
fn template_value(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "NA" || raw == "None" {
        None
    } else {
        Some(raw)
    }
}

/// 字节数可能以浮点形式输出（如 `1024.0`）
fn parse_number(raw: &str) -> Option<u64> {
    let raw = template_value(raw)?;
    raw.parse::<u64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|v| *v >= 0.0).map(|v| v as u64))
}

/// 单个输出流的汇总
#[derive(Debug, Default)]
struct StreamSummary {
    info: Option<VideoInfo>,
    finished_filename: Option<String>,
    last_error: Option<String>,
    last_line: Option<String>,
}

impl StreamSummary {
    fn handle_line(&mut self, line: &str, on_progress: &ProgressCallback) {
        match parse_output_line(line) {
            OutputLine::Progress {
                status,
                downloaded_bytes,
                total_bytes,
                filename,
            } => match status.as_str() {
                "downloading" => on_progress(ProgressEvent::Downloading {
                    filename,
                    downloaded_bytes,
                    total_bytes,
                }),
                // 视频/音频分别下载时每个文件都会 finished 一次，最终完成由调用方在进程退出后上报
                "finished" => {
                    if filename.is_some() {
                        self.finished_filename = filename;
                    }
                }
                // yt-dlp 只为 downloading/finished 输出进度模板，失败信息以进程退出时的 ERROR 行为准
                other => debug!("忽略未知进度状态: {}", other),
            },
            OutputLine::Info(json) => match serde_json::from_str::<VideoInfo>(&json) {
                Ok(info) => self.info = Some(info),
                Err(e) => warn!("解析下载信息 JSON 失败: {}", e),
            },
            OutputLine::Other(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return;
                }
                if text.starts_with("ERROR:") {
                    self.last_error = Some(text.to_string());
                }
                self.last_line = Some(text.to_string());
            }
        }
    }

    fn merge(mut self, other: StreamSummary) -> Self {
        self.info = self.info.or(other.info);
        self.finished_filename = self.finished_filename.or(other.finished_filename);
        self.last_error = self.last_error.or(other.last_error);
        self.last_line = self.last_line.or(other.last_line);
        self
    }
}

/// 逐行读取输出流（非 UTF-8 字节按有损方式转换）
async fn consume_stream<R>(reader: R, on_progress: ProgressCallback) -> std::io::Result<StreamSummary>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();
    let mut summary = StreamSummary::default();

    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buffer);
        summary.handle_line(&line, &on_progress);
    }

    Ok(summary)
}

/// yt-dlp 解析器
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    /// yt-dlp 可执行文件路径
    executable: PathBuf,
    /// 放在生成参数之前的额外参数（如 `--cookies`、`--proxy`）
    extra_args: Vec<String>,
}

impl YtDlpExtractor {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            extra_args: Vec::new(),
        }
    }

    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.executable);
        command
            .args(&self.extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    fn spawn_error(&self, source: std::io::Error) -> ExtractorError {
        ExtractorError::Spawn {
            path: self.executable.clone(),
            source,
        }
    }

    /// 元数据查询参数
    pub fn info_args(url: &str) -> Vec<String> {
        [
            "--quiet",
            "--no-warnings",
            "--no-playlist",
            "--skip-download",
            "--dump-single-json",
            "--",
            url,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    /// 下载参数
    pub fn download_args(options: &DownloadOptions) -> Vec<String> {
        let mut args: Vec<String> = [
            "--quiet",
            "--no-warnings",
            "--no-playlist",
            "--newline",
            "--progress",
            "--progress-template",
            PROGRESS_TEMPLATE,
            "--print",
            INFO_TEMPLATE,
            "--no-simulate",
            "-f",
            options.format.as_str(),
            "-o",
            options.output_template.as_str(),
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        if options.write_thumbnail {
            args.extend(["--write-thumbnail", "--convert-thumbnails", "png"].map(String::from));
        }

        args.push("--".to_string());
        args.push(options.url.clone());
        args
    }
}

/// 进程失败时的错误信息：优先 `ERROR:` 行，其次最后一行输出
fn failure_message(summary: &StreamSummary, code: i32) -> String {
    summary
        .last_error
        .clone()
        .or_else(|| summary.last_line.clone())
        .unwrap_or_else(|| format!("yt-dlp exited with status {}", code))
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn extract_info(&self, url: &str) -> Result<Option<VideoInfo>, ExtractorError> {
        debug!("获取视频信息: {}", url);

        let output = self
            .command()
            .args(Self::info_args(url))
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let mut summary = StreamSummary::default();
            let noop: ProgressCallback = std::sync::Arc::new(|_: ProgressEvent| {});
            for line in String::from_utf8_lossy(&output.stderr).lines() {
                summary.handle_line(line, &noop);
            }
            return Err(ExtractorError::Process {
                code,
                message: failure_message(&summary, code),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if stdout.is_empty() || stdout == "null" {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(stdout)?))
    }

    async fn download(
        &self,
        options: &DownloadOptions,
        on_progress: ProgressCallback,
    ) -> Result<Option<VideoInfo>, ExtractorError> {
        info!("开始下载: url={}, format={}", options.url, options.format);

        let mut child = self
            .command()
            .args(Self::download_args(options))
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            ExtractorError::Io(std::io::Error::other("yt-dlp stdout not captured"))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            ExtractorError::Io(std::io::Error::other("yt-dlp stderr not captured"))
        })?;

        // quiet 模式下进度写入 stderr，--print 写入 stdout，两路同时解析
        let stderr_task = tokio::spawn(consume_stream(stderr, on_progress.clone()));
        let stdout_summary = consume_stream(stdout, on_progress.clone()).await?;
        let stderr_summary = match stderr_task.await {
            Ok(result) => result?,
            Err(e) => return Err(ExtractorError::Io(std::io::Error::other(e))),
        };

        let status = child.wait().await?;
        let summary = stdout_summary.merge(stderr_summary);

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            return Err(ExtractorError::Process {
                code,
                message: failure_message(&summary, code),
            });
        }

        let filename = summary
            .info
            .as_ref()
            .and_then(|info| info.filepath.clone())
            .or(summary.finished_filename);
        on_progress(ProgressEvent::Finished { filename });

        Ok(summary.info)
    }
}

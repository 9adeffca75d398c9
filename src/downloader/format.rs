/// 根据可选的视频/音频格式 ID 生成 yt-dlp 格式选择表达式
///
/// 缺失的一侧用 `bestvideo` / `bestaudio` 补齐，空字符串视为未指定
pub fn select_format(video_format_id: Option<&str>, audio_format_id: Option<&str>) -> String {
    let video = video_format_id.map(str::trim).filter(|s| !s.is_empty());
    let audio = audio_format_id.map(str::trim).filter(|s| !s.is_empty());

    match (video, audio) {
        (Some(video), Some(audio)) => format!("{}+{}", video, audio),
        (Some(video), None) => format!("{}+bestaudio", video),
        (None, Some(audio)) => format!("bestvideo+{}", audio),
        (None, None) => "bestvideo+bestaudio".to_string(),
    }
}

//! yt-dlp 信息 JSON 模型及对外响应结构

use serde::{Deserialize, Serialize};

/// yt-dlp `--dump-single-json` / `%()j` 输出中用到的字段
///
/// 其余字段忽略
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub thumbnail: Option<String>,
    pub thumbnails: Option<Vec<serde_json::Value>>,
    pub filesize: Option<u64>,
    pub filesize_approx: Option<u64>,
    pub webpage_url: Option<String>,
    pub formats: Option<Vec<RawFormat>>,
    /// 下载后最终文件路径（仅下载时存在）
    pub filepath: Option<String>,
}

/// yt-dlp 格式条目
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFormat {
    pub format_id: String,
    pub ext: Option<String>,
    pub format_note: Option<String>,
    pub filesize: Option<u64>,
    pub resolution: Option<String>,
    pub fps: Option<f64>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
}

impl VideoInfo {
    /// 精确大小缺失（或为 0）时回退到估算大小
    pub fn best_filesize(&self) -> Option<u64> {
        self.filesize
            .filter(|size| *size > 0)
            .or(self.filesize_approx)
    }

    /// 是否携带缩略图列表
    pub fn has_thumbnails(&self) -> bool {
        self.thumbnails.is_some()
    }

    /// 转换为元数据记录，缺少 id 或 title 时视为未解析
    pub fn to_metadata(&self) -> Option<VideoMetadata> {
        Some(VideoMetadata {
            id: self.id.clone()?,
            title: self.title.clone()?,
            duration: self.duration,
            uploader: self.uploader.clone(),
            view_count: self.view_count,
            like_count: self.like_count,
            thumbnail: self.thumbnail.clone(),
            filesize: self.best_filesize(),
            url: self.webpage_url.clone(),
        })
    }

    /// 格式列表，yt-dlp 未返回 formats 时为 `None`
    pub fn format_descriptors(&self) -> Option<Vec<FormatDescriptor>> {
        self.formats
            .as_ref()
            .map(|formats| formats.iter().cloned().map(FormatDescriptor::from).collect())
    }
}

/// GET /metadata 响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub thumbnail: Option<String>,
    pub filesize: Option<u64>,
    pub url: Option<String>,
}

/// 格式描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    pub format_id: String,
    pub ext: Option<String>,
    pub format_note: Option<String>,
    pub filesize: Option<u64>,
    pub resolution: Option<String>,
    pub fps: Option<f64>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
}

impl From<RawFormat> for FormatDescriptor {
    fn from(raw: RawFormat) -> Self {
        Self {
            format_id: raw.format_id,
            ext: raw.ext,
            format_note: raw.format_note,
            filesize: raw.filesize,
            resolution: raw.resolution,
            fps: raw.fps,
            vcodec: raw.vcodec,
            acodec: raw.acodec,
        }
    }
}

/// GET /combined_video_info 响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedVideoInfo {
    #[serde(flatten)]
    pub metadata: VideoMetadata,
    pub formats: Vec<FormatDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info() -> VideoInfo {
        serde_json::from_str(
            r#"{
                "id": "dQw4w9WgXcQ",
                "title": "Sample",
                "duration": 212.0,
                "uploader": "Someone",
                "view_count": 1000,
                "like_count": null,
                "thumbnail": "https://i.ytimg.com/vi/x/hq.jpg",
                "thumbnails": [{"url": "https://i.ytimg.com/vi/x/hq.jpg"}],
                "filesize": null,
                "filesize_approx": 4096,
                "webpage_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                "extractor": "youtube",
                "formats": [
                    {"format_id": "137", "ext": "mp4", "fps": 30, "vcodec": "avc1", "acodec": "none"},
                    {"format_id": "140", "ext": "m4a", "filesize": 3000, "acodec": "mp4a"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_metadata_falls_back_to_approx_filesize() {
        let metadata = sample_info().to_metadata().unwrap();
        assert_eq!(metadata.id, "dQw4w9WgXcQ");
        assert_eq!(metadata.filesize, Some(4096));
        assert_eq!(
            metadata.url.as_deref(),
            Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_metadata_requires_identity() {
        let info = VideoInfo {
            title: Some("no id".to_string()),
            ..Default::default()
        };
        assert!(info.to_metadata().is_none());
    }

    #[test]
    fn test_format_descriptors() {
        let formats = sample_info().format_descriptors().unwrap();
        assert_eq!(formats.len(), 2);
        assert_eq!(formats[0].format_id, "137");
        assert_eq!(formats[0].fps, Some(30.0));
        assert_eq!(formats[1].filesize, Some(3000));

        assert!(VideoInfo::default().format_descriptors().is_none());
    }

    #[test]
    fn test_combined_info_is_flat() {
        let info = sample_info();
        let combined = CombinedVideoInfo {
            metadata: info.to_metadata().unwrap(),
            formats: info.format_descriptors().unwrap(),
        };
        let json = serde_json::to_value(&combined).unwrap();
        assert_eq!(json["title"], "Sample");
        assert_eq!(json["formats"][1]["format_id"], "140");
    }
}

//! ランドマーク記録（JSON Lines）の読み込み
//!
//! 1行1フレーム。`null` は手が検出されなかったフレーム、それ以外は
//! `{"width": 640, "height": 480, "landmarks": [[x, y, z], ...]}`。
//! 空行と `#` で始まる行は読み飛ばす。

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::session::HandFrame;

pub fn load_recording<P: AsRef<Path>>(path: P) -> Result<Vec<Option<HandFrame>>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read recording: {}", path.display()))?;
    parse_recording(&content).with_context(|| format!("Invalid recording: {}", path.display()))
}

pub fn parse_recording(content: &str) -> Result<Vec<Option<HandFrame>>> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| {
            serde_json::from_str::<Option<HandFrame>>(line)
                .with_context(|| format!("line {}: failed to parse frame", line_no))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::LandmarkIndex;

    fn frame_line(tip_x: f32) -> String {
        let landmarks: Vec<String> = (0..LandmarkIndex::COUNT)
            .map(|i| {
                if i == LandmarkIndex::IndexTip as usize {
                    format!("[{}, 0.5, -0.02]", tip_x)
                } else {
                    "[0.5, 0.5, 0.0]".to_string()
                }
            })
            .collect();
        format!(
            r#"{{"width": 640, "height": 480, "landmarks": [{}]}}"#,
            landmarks.join(", ")
        )
    }

    #[test]
    fn test_parse_frames_and_gaps() {
        let text = format!("# demo\n{}\nnull\n\n{}\n", frame_line(0.25), frame_line(0.75));
        let frames = parse_recording(&text).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames[1].is_none());

        let first = frames[0].as_ref().unwrap();
        assert_eq!(first.width, 640);
        assert_eq!(first.fingertip().x, 160.0);
        assert_eq!(first.fingertip().y, 240.0);
        assert_eq!(first.landmarks.get(LandmarkIndex::IndexTip).z, -0.02);
    }

    #[test]
    fn test_wrong_landmark_count_reports_line() {
        let text = format!(
            "{}\n{{\"width\": 640, \"height\": 480, \"landmarks\": [[0.1, 0.2, 0.0]]}}\n",
            frame_line(0.5)
        );
        let err = parse_recording(&text).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"), "{:#}", err);
    }

    #[test]
    fn test_missing_file() {
        assert!(load_recording("/nonexistent/recording.jsonl").is_err());
    }
}

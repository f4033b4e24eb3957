use serde::Deserialize;

use crate::error::MangaPagesError;

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub title: String,
    /// Directory holding one sub-directory of strips per chapter.
    pub source: String,
    /// Chapters to process; every chapter of the source when absent.
    #[serde(default, deserialize_with = "deserialize_chapters")]
    pub chapters: Option<Vec<String>>,
    pub library_dir: Option<String>,
    pub min_page_height: Option<u32>,
    pub slope_offset: Option<u32>,
    pub heal_slopes: Option<bool>,
}

/// チャプター選択文字列をパースしてチャプター名のリストに変換する。
///
/// 形式:
/// - 単一チャプター: `"5"`, `"12.5"`, `"extra"`
/// - 整数範囲: `"5-10"` (5, 6, 7, 8, 9, 10)
/// - 混合（カンマ区切り）: `"1, 3, 5-10, 12.5"`
///
/// A part with a `-` expands as a range only when both ends are integers;
/// anything else is taken as a chapter directory name. The result is in
/// natural order with duplicates removed.
pub fn parse_chapter_selection(s: &str) -> crate::error::Result<Vec<String>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(MangaPagesError::config("Chapter selection cannot be empty"));
    }

    let mut chapters = Vec::new();

    for part in trimmed.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some(range) = integer_range(part)? {
            chapters.extend(range.map(|n| n.to_string()));
            continue;
        }

        if part.contains(['/', '\\']) || part == "." || part == ".." {
            return Err(MangaPagesError::config(format!(
                "Invalid chapter name: '{part}'"
            )));
        }
        chapters.push(part.to_string());
    }

    if chapters.is_empty() {
        return Err(MangaPagesError::config(
            "Chapter selection resolved to empty set",
        ));
    }

    chapters.sort_by(|a, b| natord::compare(a, b));
    chapters.dedup();
    Ok(chapters)
}

/// `"5-10"` as an inclusive range, `None` if `part` is not two integers.
fn integer_range(part: &str) -> crate::error::Result<Option<std::ops::RangeInclusive<u32>>> {
    let Some((start_str, end_str)) = part.split_once('-') else {
        return Ok(None);
    };
    let (Ok(start), Ok(end)) = (
        start_str.trim().parse::<u32>(),
        end_str.trim().parse::<u32>(),
    ) else {
        return Ok(None);
    };

    if start > end {
        return Err(MangaPagesError::config(format!(
            "Invalid chapter range: start ({start}) > end ({end})"
        )));
    }
    Ok(Some(start..=end))
}

/// serdeのdeserialize_withで使用するチャプター範囲デシリアライザ
fn deserialize_chapters<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    s.map(|s| parse_chapter_selection(&s).map_err(serde::de::Error::custom))
        .transpose()
}

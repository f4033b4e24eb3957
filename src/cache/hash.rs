// SHA-256 of the segmentation settings
//
// Stored with every chapter entry so pages produced under different tunables
// are recomputed instead of reused.

use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};

use crate::segment::SegmentConfig;

/// 設定を正規化JSON形式に変換する（キーはアルファベット順で固定）。
fn settings_to_canonical_json(config: &SegmentConfig) -> String {
    // serde_json::Map keeps keys sorted.
    let mut map = Map::new();
    map.insert("black_white_threshold".into(), json!(config.black_white_threshold));
    map.insert("cut_agreement".into(), json!(config.cut_agreement));
    map.insert("heal_slopes".into(), json!(config.heal_slopes));
    map.insert("line_samples".into(), json!(config.line_samples));
    map.insert("max_dissimilar_pixels".into(), json!(config.max_dissimilar_pixels));
    map.insert("min_output_height".into(), json!(config.min_output_height));
    map.insert("min_page_height".into(), json!(config.min_page_height));
    map.insert("similarity_threshold".into(), json!(config.similarity_threshold));
    map.insert("slope_offset".into(), json!(config.slope_offset));
    map.insert("slope_samples".into(), json!(config.slope_samples));
    map.insert("trim_agreement".into(), json!(config.trim_agreement));
    Value::Object(map).to_string()
}

/// 設定からキャッシュキー（SHA-256ハッシュ）を計算する。
///
/// The key is a lowercase hexadecimal string of 64 characters.
pub fn compute_cache_key(config: &SegmentConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(settings_to_canonical_json(config).as_bytes());
    hex::encode(hasher.finalize())
}

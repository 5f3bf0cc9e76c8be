//! 認識プログラム出力のパーサー
//!
//! OCRコマンドやサイドカーファイルの出力からJSONを抽出し、
//! TextFragment の列に変換する

use crate::error::{Error, Result};
use crate::types::{NormalizedRect, TextFragment};
use serde::Deserialize;

/// 出力からJSON部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 前後のログ行に埋め込まれた、JSONとして完結する最初の [...] / {...}
/// 3. エラー
///
/// ログ中の `[INFO]` や `done [ok]` のような括弧はJSONとして読めないので飛ばす。
///
/// # Arguments
/// * `output` - 認識プログラムの標準出力やサイドカーファイルの内容
///
/// # Returns
/// * `Ok(&str)` - 抽出されたJSON文字列
/// * `Err` - JSONが見つからない場合
///
/// # Examples
/// ```
/// use receipt_scan_common::extract_json;
///
/// let output = "[INFO] loading model\n[{\"text\": \"TOTAL\"}]\ndone [ok]";
/// let json = extract_json(output).unwrap();
/// assert_eq!(json, "[{\"text\": \"TOTAL\"}]");
/// ```
pub fn extract_json(output: &str) -> Result<&str> {
    json_candidates(output)
        .next()
        .ok_or_else(|| Error::Parse("JSONが見つかりません".into()))
}

/// JSONの候補を出現順に列挙
///
/// ```json ブロックがあればそれだけを返す。無ければ `[` / `{` の位置ごとに
/// 値を1つだけ読み、読めた範囲を返して、その直後から探索を続ける。
fn json_candidates(output: &str) -> Box<dyn Iterator<Item = &str> + '_> {
    if let Some(start_marker) = output.find("```json") {
        let start = start_marker + 7; // "```json" の長さ
        if let Some(end_offset) = output[start..].find("```") {
            let end = start + end_offset;
            return Box::new(std::iter::once(output[start..end].trim()));
        }
    }

    let mut position = 0;
    Box::new(std::iter::from_fn(move || {
        while let Some(offset) = output[position..].find(|c| c == '[' || c == '{') {
            let start = position + offset;
            let mut stream =
                serde_json::Deserializer::from_str(&output[start..]).into_iter::<serde_json::Value>();
            match stream.next() {
                Some(Ok(_)) => {
                    let end = start + stream.byte_offset();
                    position = end;
                    return Some(&output[start..end]);
                }
                _ => position = start + 1,
            }
        }
        None
    }))
}

/// 認識結果1件（出力形式の揺れを吸収）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawObservation {
    #[serde(default)]
    text: String,
    #[serde(alias = "bounding_box", alias = "bounds")]
    bounding_box: NormalizedRect,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOutput {
    List(Vec<RawObservation>),
    Wrapped { items: Vec<RawObservation> },
}

impl RawObservation {
    fn into_fragment(self) -> TextFragment {
        let fragment = TextFragment::new(self.text, self.bounding_box);
        match self.confidence {
            Some(confidence) => fragment.with_confidence(confidence),
            None => fragment,
        }
    }
}

/// 出力をパースして断片列にする
///
/// 候補のJSONを順に試し、認識結果の形（配列または `{"items": [...]}`）として
/// 読めた最初のものを採用する。座標は出力のまま（原点変換は呼び出し側）。
///
/// # Arguments
/// * `output` - 認識プログラムの出力
///
/// # Returns
/// * `Ok(Vec<TextFragment>)` - パース成功（IDは新規発行）
/// * `Err` - JSONが見つからないか、どの候補も認識結果として読めない
pub fn parse_observations(output: &str) -> Result<Vec<TextFragment>> {
    let mut last_error = None;

    for candidate in json_candidates(output) {
        match serde_json::from_str::<RawOutput>(candidate.trim()) {
            Ok(RawOutput::List(items)) | Ok(RawOutput::Wrapped { items }) => {
                return Ok(items.into_iter().map(RawObservation::into_fragment).collect());
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(match last_error {
        Some(e) => Error::Parse(format!("認識結果 JSONパースエラー: {}", e)),
        None => Error::Parse("JSONが見つかりません".into()),
    })
}

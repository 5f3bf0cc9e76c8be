//! Receipt Scan Common Library
//!
//! OCR断片の行再構成・色分けと、バックエンドとやり取りするワイヤ型。
//! I/Oを持たず、CLIとライブスキャンの両方から使われる。

pub mod types;
pub mod rows;
pub mod colors;
pub mod sanitize;
pub mod payload;
pub mod invoice;
pub mod report;
pub mod error;
pub mod parser;
pub mod export;

pub use types::{ColorTag, FragmentId, NormalizedRect, TextFragment, PALETTE};
pub use rows::{group_into_rows, Row, RowAnchor, RowGrouper, MIN_ROW_THRESHOLD};
pub use colors::{assign_colors, assign_colors_with_tolerance, ColorAssigner, ColorBand, DEFAULT_TOLERANCE};
pub use sanitize::{sanitize_fragments, Sanitized};
pub use payload::{rows_to_strings, ExtractedTextRequest};
pub use invoice::{display_date, DeleteResponse, Invoice, InvoiceEnvelope, Item, Tax, TextExtractResponse, UploadedFile};
pub use report::{BatchReport, ScanFailure, ScanReport};
pub use error::{Error, Result};
pub use parser::{extract_json, parse_observations};

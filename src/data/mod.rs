/// Data layer: ingestion, the cleaning pipeline, and output.
///
/// Architecture:
/// ```text
///   filelist.txt
///        │
///        ▼
///   ┌──────────┐
///   │ manifest │  file list → paths + per-file settings
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  .odv/.txt → RawFile (headers, raw cells)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ resolve  │  headers → canonical columns, quality codes, then coerce
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ pipeline │  filter → outlier → repeat → select, validity gate after each
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export  │  cleaned records → flat CSV rows
///   └──────────┘
/// ```

pub mod coerce;
pub mod export;
pub mod filter;
pub mod loader;
pub mod manifest;
pub mod model;
pub mod outlier;
pub mod pipeline;
pub mod repeat;
pub mod resolve;
pub mod select;

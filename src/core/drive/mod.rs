pub mod content_fetcher;
pub mod content_flattener;
pub mod document_locator;
pub mod drive_config;
pub mod drive_errors;
pub mod drive_models;
pub mod drive_service;
pub mod drive_store;
pub mod path_parser;
pub mod resolution_cache;

#[cfg(test)]
pub mod test_support;

#[allow(unused_imports)]
pub use content_flattener::flatten;
#[allow(unused_imports)]
pub use drive_config::{DriveConfig, TieBreak};
#[allow(unused_imports)]
pub use drive_errors::{ClientError, DriveError, FlattenError, ParseWarning};
#[allow(unused_imports)]
pub use drive_models::{
    DocBlock, DocContent, DocType, DriveCandidate, ExportFormat, FlatText, ListMarker,
    ParentInfo, ParsedPath, ResolvedDocument, SheetContent, SheetTab, Slide, SlideDeck,
    SlideShape, StructuredContent, TableCell, TableRow, TextRun,
};
pub use drive_service::DriveService;
pub use drive_store::{DriveContent, DriveMetadata};
#[allow(unused_imports)]
pub use path_parser::PathParser;
#[allow(unused_imports)]
pub use resolution_cache::ResolutionCache;

// =============================================================================
// GOOGLE DRIVE MODULE
// =============================================================================
//
// HTTP implementations of the core drive traits. The core layer resolves paths
// and flattens content; everything that talks to googleapis.com lives here.
//
// One `GoogleDriveClient` serves both `DriveMetadata` (search, parent lookup)
// and `DriveContent` (Docs, Sheets and Slides payloads).

pub mod google_auth;
pub mod google_drive_client;

pub use google_auth::GoogleAuth;
pub use google_drive_client::GoogleDriveClient;

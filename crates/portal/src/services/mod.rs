//! Business logic services for the portal.
//!
//! # Services
//!
//! - `identity` - Role decisions for the sign-up and admin login forms
//! - `workflow` - Basket registration, approval and status edits
//! - `board` - Keyed join behind the cashier listing
//! - `live` - Postgres change feed keeping the board current
//! - `spreadsheet` - Workbook reading for uploads
//! - `labels` - Label row validation
//! - `upload` - Catalog validation and image-embedding upload
//! - `layout` - Label grid layout
//! - `bill` - Receipt totals

pub mod bill;
pub mod board;
pub mod identity;
pub mod labels;
pub mod layout;
pub mod live;
pub mod spreadsheet;
pub mod upload;
pub mod workflow;

pub use board::{BasketBoard, BoardRow, Change, Snapshot};
pub use identity::{Admission, IdentityError, IdentityGate};
pub use labels::{LabelBatch, LabelRecord, LabelRowError, RowOutcome};
pub use layout::{LabelGrid, PrintOptions, layout_labels};
pub use live::LiveBoard;
pub use spreadsheet::{SheetRow, SpreadsheetError};
pub use upload::{
    HttpImageFetcher, ImageFetcher, PgProductSink, ProductSink, UploadError, UploadReport,
    upload_catalog,
};
pub use workflow::{ApprovalOutcome, BasketStore, BasketWorkflow, PgBasketStore, WorkflowError};

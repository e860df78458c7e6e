//! SeaORM entity models
//!
//! Database entities for the PDF catalog

mod admin;
mod pdf;

pub use pdf::{
    Entity as PdfEntity,
    Model as PdfRow,
    ActiveModel as PdfActiveModel,
    Column as PdfColumn,
};

pub use admin::{
    Entity as AdminEntity,
    ActiveModel as AdminActiveModel,
    Column as AdminColumn,
};

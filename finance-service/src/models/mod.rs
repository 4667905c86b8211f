pub mod document;
pub mod line_item;
pub mod money;
pub mod payment;
pub mod recurring;
pub mod status;

pub use document::{
    CreateDocument, DocumentAction, DocumentType, FinancialDocument, InvoiceKind,
    ListDocumentsFilter, PaymentTerms, UpdateDocument,
};
pub use line_item::{LineItem, LineItemInput};
pub use money::Money;
pub use payment::{Payment, PaymentMethod, RecordPayment};
pub use recurring::{CreateRecurringProfile, Frequency, RecurringProfile, RecurringStatus};
pub use status::{DocumentStatus, EstimateStatus, PayableStatus, StatusGraph};

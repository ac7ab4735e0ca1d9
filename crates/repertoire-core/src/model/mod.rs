pub mod composer;
pub mod ids;
pub mod label;
pub mod page;
pub mod performer;
pub mod recording;
pub mod work;

pub use composer::Composer;
pub use ids::{ComposerId, LabelId, PageId, PerformerId, RecordingId, WorkId};
pub use label::Label;
pub use page::ScrapedPage;
pub use performer::{Credit, Performer};
pub use recording::{Recording, RecordingType};
pub use work::Work;

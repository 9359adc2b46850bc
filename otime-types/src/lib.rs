//! Shared domain and wire types for the otime timing system.
//!
//! Everything here is plain data: the result engine, the store and the API
//! layers all exchange these types. Wire DTOs (card-reader messages and
//! responses) live in [`card`], persistent domain records in the remaining
//! modules.

pub mod card;
pub mod class_params;
pub mod competitor;
pub mod entry;
pub mod event;
pub mod result;
pub mod series;

pub use card::{CardEntryType, CardPunch, CardReaderLog, CardReaderMessage, CardReaderResponse, LightStatus};
pub use class_params::{ClassParams, Otype, VoidedLeg, COURSE_FINISH, COURSE_START};
pub use competitor::{ClubType, CompetitorType, Gender};
pub use entry::{ClassResults, EntryImport, EntryType, PersonRaceStart, RankedEntry};
pub use event::{ClassType, CourseType, EventType};
pub use result::{Extensions, PersonRaceResult, PunchTime, ResultStatus, SplitStatus, SplitTime};
pub use series::{PersonSeriesResult, Points, SeriesMode, SeriesSettings};

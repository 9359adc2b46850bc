pub mod cardreader;
pub mod classes;
pub mod clubs;
pub mod competitors;
pub mod courses;
pub mod entries;
pub mod events;
pub mod series;

mod feed_record;
mod list_item;
mod temperature_unit;

pub use feed_record::FeedRecord;
pub use list_item::ListItem;
pub use temperature_unit::TemperatureUnit;

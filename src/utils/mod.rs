pub mod card_filter;
pub mod db_utils;
pub mod student_cache;

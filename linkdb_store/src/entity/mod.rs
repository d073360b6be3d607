pub mod link_entries;

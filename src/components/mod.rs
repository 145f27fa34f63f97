pub mod drop_zone;
pub mod metrics_view;
pub mod result_panel;
pub mod sidebar;

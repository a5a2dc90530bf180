//! GUI module - User interface components

mod app;
mod chart_viewer;
mod control_panel;
mod explorer_tab;
mod migration_tab;
mod theme;
mod widgets;

pub use app::ExplorerApp;
pub use chart_viewer::ChartViewer;
pub use control_panel::{ControlPanel, ControlPanelAction};
pub use explorer_tab::ExplorerTab;
pub use migration_tab::MigrationTab;

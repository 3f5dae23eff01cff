pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{dim, error, header, info, muted, not_repaired, path_status, section, success, warn};
pub use progress::BatchBar;
pub use table::TableBuilder;
pub use theme::{theme, Theme};

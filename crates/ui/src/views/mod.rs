mod attempt;
mod home;
mod result;
mod state;

pub use attempt::AttemptView;
pub use home::HomeView;
pub use result::ResultView;
pub use state::{ViewError, ViewState, view_state_from_resource};

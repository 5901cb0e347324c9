mod machine;
mod view;

pub use machine::{Notice, Phase, RenderView, Session, Transition};
pub use view::{Filter, ViewState};

pub mod bridge;
pub mod error;
pub mod event_loop;
pub mod html;
pub mod overlay;
pub mod renderer;
pub mod script;

#[cfg(test)]
mod test_support;

mod confirm_dialog;
pub use confirm_dialog::ConfirmDialog;

mod toast_viewport;
pub use toast_viewport::ToastViewport;

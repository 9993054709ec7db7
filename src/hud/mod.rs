//! Animated overlay state drawn on top of the cat: the combo counter, the
//! footer bar and achievement toasts.

pub mod combo_label;
pub mod footer;
pub mod toast;

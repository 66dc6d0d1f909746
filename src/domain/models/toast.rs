#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Error,
}

/// A short lived notice shown in the status line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub text: String,
}

impl Toast {
    pub fn info(text: &str) -> Toast {
        return Toast {
            kind: ToastKind::Info,
            text: text.to_string(),
        };
    }

    pub fn error(text: &str) -> Toast {
        return Toast {
            kind: ToastKind::Error,
            text: text.to_string(),
        };
    }
}

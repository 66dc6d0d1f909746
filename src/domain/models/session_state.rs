#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionState {
    #[default]
    Initial,
    Creating,
    Created,
    Updating,
    Updated,
}

impl SessionState {
    /// True while a generation stream is in flight. Submissions are refused
    /// in this state.
    pub fn is_loading(&self) -> bool {
        return matches!(self, SessionState::Creating | SessionState::Updating);
    }

    /// True once a first generation has been committed, which is when
    /// revisions become possible.
    pub fn has_generated(&self) -> bool {
        return matches!(self, SessionState::Created | SessionState::Updated);
    }
}

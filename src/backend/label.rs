use std::fmt;

/// Branch target inside one method. Created by `Method::new_label` and
/// placed exactly once with `Method::mark`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub(super) usize);

impl Label {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L_{}", self.0)
    }
}

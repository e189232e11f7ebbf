use patchwork_text::{Point, Text};
use std::fmt;

/// One recorded edit, located in both coordinate spaces.
///
/// Changes handed out by [`crate::Patch`] borrow their text payloads from the
/// patch. `old_text`/`new_text` are `None` when the payload was elided; the
/// sizes are still tracked in `old_text_size`/`new_text_size`. The preceding
/// sizes are the totals over every earlier change, which lets a consumer turn
/// a position into a linear offset without storing text at every node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Change<'a> {
    pub old_start: Point,
    pub old_end: Point,
    pub new_start: Point,
    pub new_end: Point,
    pub old_text: Option<&'a Text>,
    pub new_text: Option<&'a Text>,
    pub preceding_old_text_size: u32,
    pub preceding_new_text_size: u32,
    pub old_text_size: u32,
    pub new_text_size: u32,
}

impl Change<'_> {
    pub fn old_extent(&self) -> Point {
        self.old_end.traversal(self.old_start)
    }

    pub fn new_extent(&self) -> Point {
        self.new_end.traversal(self.new_start)
    }
}

impl fmt::Display for Change<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{old: {} - {}, new: {} - {}",
            self.old_start, self.old_end, self.new_start, self.new_end
        )?;
        if let Some(text) = self.old_text {
            write!(f, ", old_text: {:?}", text.to_string())?;
        }
        if let Some(text) = self.new_text {
            write!(f, ", new_text: {:?}", text.to_string())?;
        }
        write!(f, "}}")
    }
}

/// Interactable objects and their dialogue state.
///
/// Page selection is a tiny per-object state machine:
///
///   Unvisited ──open──▶ FirstPages
///   Visited   ──open──▶ RepeatPages   (only if repeat pages exist)
///
/// "Visited" means the object's memory is already in the collected set.
/// An object without a memory is always Unvisited.

use super::memory::Memory;

#[derive(Clone, Debug)]
pub struct Interactable {
    pub id: &'static str,
    pub name: &'static str,
    pub tx: i32,
    pub ty: i32,
    pub pages: Vec<&'static str>,
    pub repeat: Option<Vec<&'static str>>,
    pub memory: Option<Memory>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DialogueState {
    Unvisited,
    Visited,
}

impl Interactable {
    /// Manhattan distance ≤ 1 from the given tile.
    pub fn is_near(&self, tx: i32, ty: i32) -> bool {
        (self.tx - tx).abs() + (self.ty - ty).abs() <= 1
    }

    pub fn dialogue_state<F: Fn(&str) -> bool>(&self, is_collected: F) -> DialogueState {
        match &self.memory {
            Some(m) if is_collected(&m.id) => DialogueState::Visited,
            _ => DialogueState::Unvisited,
        }
    }

    /// Pages to show when opened in `state`.
    pub fn pages_for(&self, state: DialogueState) -> &[&'static str] {
        match (state, &self.repeat) {
            (DialogueState::Visited, Some(repeat)) => repeat,
            _ => &self.pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streetlight() -> Interactable {
        Interactable {
            id: "streetlight",
            name: "streetlight",
            tx: 10,
            ty: 8,
            pages: vec!["the streetlight hums.", "a tiny sticker."],
            repeat: Some(vec!["it flickers."]),
            memory: Some(Memory::new("m_sticker", "sticker", "stay soft. stay sharp.")),
        }
    }

    #[test]
    fn near_is_manhattan_one() {
        let o = streetlight();
        assert!(o.is_near(10, 8));
        assert!(o.is_near(11, 8));
        assert!(o.is_near(10, 7));
        assert!(!o.is_near(11, 9));
        assert!(!o.is_near(12, 8));
    }

    #[test]
    fn first_visit_then_repeat() {
        let o = streetlight();
        let s = o.dialogue_state(|_| false);
        assert_eq!(s, DialogueState::Unvisited);
        assert_eq!(o.pages_for(s).len(), 2);

        let s = o.dialogue_state(|id| id == "m_sticker");
        assert_eq!(s, DialogueState::Visited);
        assert_eq!(o.pages_for(s), &["it flickers."]);
    }

    #[test]
    fn visited_without_repeat_falls_back_to_first_pages() {
        let mut o = streetlight();
        o.repeat = None;
        let s = o.dialogue_state(|_| true);
        assert_eq!(o.pages_for(s).len(), 2);
    }

    #[test]
    fn object_without_memory_never_visited() {
        let mut o = streetlight();
        o.memory = None;
        assert_eq!(o.dialogue_state(|_| true), DialogueState::Unvisited);
    }
}

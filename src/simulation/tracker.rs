//! Follow one body through merges and removal
//!
//! A `Tracker` listens to its body's `Merged` and `RemoveFromSpace` events
//! and retargets itself. Listeners live on the body, so after a merge the
//! tracker must be moved onto the survivor with [`Tracker::refresh`].

use std::cell::Cell;
use std::rc::Rc;

use crate::simulation::error::SpaceError;
use crate::simulation::events::ListenerId;
use crate::simulation::space::Space;
use crate::simulation::states::{Body, BodyEvent, BodyEventKind, BodyId};

#[derive(Debug)]
pub struct Tracker {
    target: Rc<Cell<Option<BodyId>>>,
    attached: Option<Attachment>,
}

#[derive(Debug, Clone, Copy)]
struct Attachment {
    body: BodyId,
    merged: ListenerId,
    removed: ListenerId,
}

impl Tracker {
    /// Start tracking `id`, which must be in `space`
    pub fn follow(space: &mut Space, id: BodyId) -> Result<Self, SpaceError> {
        let body = space.body_mut(id).ok_or(SpaceError::BodyNotFound(id))?;
        let target = Rc::new(Cell::new(Some(id)));
        let attached = Some(attach(body, &target));
        Ok(Self { target, attached })
    }

    /// Body currently tracked, `None` once it left the space without a survivor
    pub fn target(&self) -> Option<BodyId> {
        self.target.get()
    }

    pub fn body<'a>(&self, space: &'a Space) -> Option<&'a Body> {
        self.target().and_then(|id| space.body(id))
    }

    /// Move the listeners onto the current target if a merge retargeted us.
    /// Call between steps.
    pub fn refresh(&mut self, space: &mut Space) {
        let current = self.target();
        if self.attached.map(|a| a.body) == current {
            return;
        }
        self.detach(space);
        match current.and_then(|id| space.body_mut(id)) {
            Some(body) => {
                self.target.set(Some(body.id()));
                self.attached = Some(attach(body, &self.target));
            }
            None => self.target.set(None),
        }
    }

    /// Unregister from the tracked body, if it is still in `space`
    pub fn detach(&mut self, space: &mut Space) {
        if let Some(a) = self.attached.take() {
            if let Some(body) = space.body_mut(a.body) {
                body.remove_event_listener(BodyEventKind::Merged, a.merged);
                body.remove_event_listener(BodyEventKind::RemoveFromSpace, a.removed);
            }
        }
    }
}

fn attach(body: &mut Body, target: &Rc<Cell<Option<BodyId>>>) -> Attachment {
    let own = body.id();

    let t = Rc::clone(target);
    let merged = body.add_event_listener(BodyEventKind::Merged, move |e| {
        if let BodyEvent::Merged { target } = e {
            t.set(Some(*target));
        }
        Ok(())
    });

    let t = Rc::clone(target);
    let removed = body.add_event_listener(BodyEventKind::RemoveFromSpace, move |_| {
        // a preceding Merged already pointed us at the survivor
        if t.get() == Some(own) {
            t.set(None);
        }
        Ok(())
    });

    Attachment { body: own, merged, removed }
}

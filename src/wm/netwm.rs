//! NetWM Module
//!
//! `_NET_WM_STATE` and `WM_CHANGE_STATE` decoding, and the translation of
//! window state changes into host shell requests.

use crosswl_proto::ShellRequest;
use x11rb::protocol::xproto::Atom;

use crate::shared::window_state::WindowFlags;
use crate::wm::ewmh::Atoms;

/// ICCCM IconicState, as sent in `WM_CHANGE_STATE`
pub const ICONIC_STATE: u32 = 3;

/// `_NET_WM_STATE` action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAction {
    Remove,
    Add,
    Toggle,
}

impl StateAction {
    pub fn from_wire(action: u32) -> Option<Self> {
        match action {
            0 => Some(Self::Remove),
            1 => Some(Self::Add),
            2 => Some(Self::Toggle),
            _ => None,
        }
    }

    pub fn apply(self, current: bool) -> bool {
        match self {
            Self::Remove => false,
            Self::Add => true,
            Self::Toggle => !current,
        }
    }
}

/// State atoms the WM understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAtom {
    Fullscreen,
    MaximizedHorz,
    MaximizedVert,
}

impl StateAtom {
    pub fn lookup(atoms: &Atoms, atom: Atom) -> Option<Self> {
        let table = [
            (atoms.net_wm_state_fullscreen, Self::Fullscreen),
            (atoms.net_wm_state_maximized_horz, Self::MaximizedHorz),
            (atoms.net_wm_state_maximized_vert, Self::MaximizedVert),
        ];
        table
            .into_iter()
            .find(|&(candidate, _)| atom != 0 && candidate == atom)
            .map(|(_, state)| state)
    }
}

/// Decoded `_NET_WM_STATE` client message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateRequest {
    pub action: StateAction,
    /// Axes named by the message
    pub axes: WindowFlags,
}

impl StateRequest {
    /// Decode `[action, first, second, source, 0]`.
    ///
    /// Maximized is only requested when both maximize atoms are present.
    pub fn decode(atoms: &Atoms, data: &[u32; 5]) -> Option<Self> {
        let action = StateAction::from_wire(data[0])?;
        let named: Vec<StateAtom> = data[1..=2]
            .iter()
            .filter_map(|&atom| StateAtom::lookup(atoms, atom))
            .collect();

        let mut axes = WindowFlags::empty();
        if named.contains(&StateAtom::Fullscreen) {
            axes |= WindowFlags::FULLSCREEN;
        }
        if named.contains(&StateAtom::MaximizedHorz) && named.contains(&StateAtom::MaximizedVert) {
            axes |= WindowFlags::MAXIMIZED;
        }

        Some(Self { action, axes })
    }

    /// New flags after applying the action to each named axis
    pub fn apply(&self, mut state: WindowFlags) -> WindowFlags {
        for axis in self.axes.iter() {
            let value = self.action.apply(state.contains(axis));
            state.set(axis, value);
        }
        state
    }
}

/// Host requests that bring `host` in line with `target`, each paired with
/// the axis it updates.
///
/// Fullscreen comes before maximized. Leaving iconified has no host request.
pub fn sync_requests(
    toplevel: u32,
    host: WindowFlags,
    target: WindowFlags,
) -> Vec<(WindowFlags, ShellRequest)> {
    let mut requests = Vec::new();

    if host.fullscreen() != target.fullscreen() {
        let request = if target.fullscreen() {
            ShellRequest::SetFullscreen { toplevel }
        } else {
            ShellRequest::UnsetFullscreen { toplevel }
        };
        requests.push((WindowFlags::FULLSCREEN, request));
    }
    if host.maximized() != target.maximized() {
        let request = if target.maximized() {
            ShellRequest::SetMaximized { toplevel }
        } else {
            ShellRequest::UnsetMaximized { toplevel }
        };
        requests.push((WindowFlags::MAXIMIZED, request));
    }
    if target.iconified() && !host.iconified() {
        requests.push((WindowFlags::ICONIFIED, ShellRequest::SetMinimized { toplevel }));
    }

    requests
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atoms() -> Atoms {
        let mut next = 0;
        Atoms::intern_with(None, |_| {
            next += 1;
            Ok(next)
        })
        .unwrap()
    }

    #[test]
    fn test_actions() {
        assert_eq!(StateAction::from_wire(3), None);
        assert!(!StateAction::Remove.apply(true));
        assert!(StateAction::Add.apply(true));
        assert!(StateAction::Toggle.apply(false));
        assert!(!StateAction::Toggle.apply(true));
    }

    #[test]
    fn test_decode_fullscreen() {
        let atoms = atoms();
        let data = [1, atoms.net_wm_state_fullscreen, 0, 1, 0];
        let request = StateRequest::decode(&atoms, &data).unwrap();
        assert_eq!(request.action, StateAction::Add);
        assert_eq!(request.axes, WindowFlags::FULLSCREEN);
    }

    #[test]
    fn test_single_maximize_atom_is_ignored() {
        let atoms = atoms();
        let data = [1, atoms.net_wm_state_maximized_horz, 0, 1, 0];
        let request = StateRequest::decode(&atoms, &data).unwrap();
        assert!(request.axes.is_empty());

        let data = [
            1,
            atoms.net_wm_state_maximized_vert,
            atoms.net_wm_state_maximized_horz,
            1,
            0,
        ];
        let request = StateRequest::decode(&atoms, &data).unwrap();
        assert_eq!(request.axes, WindowFlags::MAXIMIZED);
    }

    #[test]
    fn test_unknown_atom_does_not_hide_known_one() {
        let atoms = atoms();
        let data = [2, 9999, atoms.net_wm_state_fullscreen, 1, 0];
        let request = StateRequest::decode(&atoms, &data).unwrap();
        assert_eq!(request.axes, WindowFlags::FULLSCREEN);
        assert_eq!(request.apply(WindowFlags::MAXIMIZED), WindowFlags::all() - WindowFlags::ICONIFIED);
    }

    #[test]
    fn test_sync_requests_order() {
        let requests = sync_requests(
            4,
            WindowFlags::MAXIMIZED,
            WindowFlags::FULLSCREEN,
        );
        assert_eq!(
            requests,
            vec![
                (WindowFlags::FULLSCREEN, ShellRequest::SetFullscreen { toplevel: 4 }),
                (WindowFlags::MAXIMIZED, ShellRequest::UnsetMaximized { toplevel: 4 }),
            ]
        );
        assert!(sync_requests(4, WindowFlags::ICONIFIED, WindowFlags::empty()).is_empty());
    }
}

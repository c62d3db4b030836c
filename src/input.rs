use crate::surface::DrawingSurface;
use egui::{Context, Key, Pos2, Rect};

/// Canvas-level input, with positions relative to the canvas' top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown(Pos2),
    PointerMove(Pos2),
    PointerUp(Pos2),
    /// The pointer left the canvas while a drag was in progress.
    PointerLeave,
    Undo,
}

/// The slice of egui pointer state the canvas cares about, captured once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerFrame {
    pub pos: Option<Pos2>,
    pub primary_pressed: bool,
    pub primary_down: bool,
    pub primary_released: bool,
    pub undo_shortcut: bool,
}

impl PointerFrame {
    pub fn capture(ctx: &Context) -> Self {
        ctx.input(|input| PointerFrame {
            pos: input.pointer.interact_pos(),
            primary_pressed: input.pointer.primary_pressed(),
            primary_down: input.pointer.primary_down(),
            primary_released: input.pointer.primary_released(),
            undo_shortcut: input.modifiers.command && input.key_pressed(Key::Z),
        })
    }
}

/// Turns per-frame pointer state into canvas events.
#[derive(Debug, Clone)]
pub struct InputHandler {
    last_pointer_pos: Option<Pos2>,
    canvas_rect: Rect,
    dragging: bool,
}

impl InputHandler {
    pub fn new(canvas_rect: Rect) -> Self {
        Self {
            last_pointer_pos: None,
            canvas_rect,
            dragging: false,
        }
    }

    /// Update the canvas rectangle (e.g. if window is resized)
    pub fn set_canvas_rect(&mut self, rect: Rect) {
        self.canvas_rect = rect;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    fn to_local(&self, pos: Pos2) -> Pos2 {
        (pos - self.canvas_rect.min).to_pos2()
    }

    /// Read this frame's input from egui and translate it.
    pub fn process_input(&mut self, ctx: &Context) -> Vec<InputEvent> {
        self.process(PointerFrame::capture(ctx))
    }

    pub fn process(&mut self, frame: PointerFrame) -> Vec<InputEvent> {
        let mut events = Vec::new();
        let inside = frame.pos.filter(|pos| self.canvas_rect.contains(*pos));

        if frame.primary_pressed {
            if let Some(pos) = inside {
                events.push(InputEvent::PointerDown(self.to_local(pos)));
                self.dragging = true;
            }
        } else if self.dragging {
            match inside {
                Some(pos) if Some(pos) != self.last_pointer_pos && frame.primary_down => {
                    events.push(InputEvent::PointerMove(self.to_local(pos)));
                }
                Some(_) => {}
                None => {
                    events.push(InputEvent::PointerLeave);
                    self.dragging = false;
                }
            }
        }

        if frame.primary_released && self.dragging {
            let pos = inside
                .or(self.last_pointer_pos)
                .unwrap_or(self.canvas_rect.min);
            events.push(InputEvent::PointerUp(self.to_local(pos)));
            self.dragging = false;
        }

        if frame.undo_shortcut {
            events.push(InputEvent::Undo);
        }

        self.last_pointer_pos = frame.pos;
        events
    }
}

/// Apply one event to the surface.
pub fn dispatch(event: InputEvent, surface: &mut DrawingSurface) {
    log::trace!("Canvas input: {:?}", event);
    match event {
        InputEvent::PointerDown(pos) => surface.pointer_down(pos),
        InputEvent::PointerMove(pos) => surface.pointer_move(pos),
        InputEvent::PointerUp(pos) => surface.pointer_up(pos),
        InputEvent::PointerLeave => surface.pointer_leave(),
        InputEvent::Undo => surface.undo(),
    }
}

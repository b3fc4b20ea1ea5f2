use tracing::debug;

use crate::picture::Picture;

/// Surface the current picture is painted onto.
///
/// Drawing the same picture twice must be harmless.
pub trait RenderSurface {
    fn draw(&mut self, picture: &Picture);
}

/// Result of one presentation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    Presented,
    NoSurface,
    /// The widget had no decodable picture yet.
    NoPicture,
}

/// Copies the widget's latest picture onto the rendering surface.
///
/// There is no frame queue: each call draws whatever is current, so pictures
/// may be skipped under load but are never drawn out of order.
#[derive(Debug)]
pub struct Presenter<S> {
    surface: Option<S>,
    presented: u64,
}

impl<S> Default for Presenter<S> {
    fn default() -> Self {
        Self {
            surface: None,
            presented: 0,
        }
    }
}

impl<S> Presenter<S>
where
    S: RenderSurface,
{
    pub fn attach(&mut self, surface: S) -> Option<S> {
        self.surface.replace(surface)
    }

    pub fn detach(&mut self) -> Option<S> {
        self.surface.take()
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    /// Number of pictures drawn so far.
    pub fn presented(&self) -> u64 {
        self.presented
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn present(&mut self, picture: Option<Picture>) -> PresentOutcome {
        let Some(surface) = self.surface.as_mut() else {
            return PresentOutcome::NoSurface;
        };
        let Some(picture) = picture else {
            return PresentOutcome::NoPicture;
        };
        if !picture.is_well_formed() {
            debug!(
                width = picture.width,
                height = picture.height,
                len = picture.bytes.len(),
                "skipping malformed picture"
            );
            return PresentOutcome::NoPicture;
        }

        surface.draw(&picture);
        self.presented += 1;
        PresentOutcome::Presented
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Telling the outside world what happened.
//!
//! A `SeamImage` reports to any number of observers.  Implement
//! `CarveObserver` directly to be called back synchronously, or use a
//! `ChannelObserver` to receive owned `CarveEvent`s on another thread.
//! Observers must not assume which thread they are called on.

use crate::error::CarveError;
use crossbeam::channel::{self, Receiver, Sender};
use image::RgbImage;
use tracing::trace;

pub trait CarveObserver: Send {
    /// The image was replaced.  Called after every successful carve or
    /// add.
    fn image_changed(&mut self, _image: &RgbImage) {}

    /// A carve or add finished, successfully or not.  Called exactly
    /// once per request.
    fn operation_completed(&mut self, _outcome: Result<(), &CarveError>) {}

    /// The pixels about to be removed or duplicated, in the coordinates
    /// of the image as it stands.  Only sent when asked for.
    fn seam_highlighted(&mut self, _points: &[(u32, u32)]) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarveEvent {
    ImageChanged { width: u32, height: u32 },
    OperationCompleted { error: Option<String> },
    SeamHighlighted(Vec<(u32, u32)>),
}

/// Forwards every notification down a channel.  A receiver that has
/// gone away is not an error; the events are dropped.
pub struct ChannelObserver {
    sender: Sender<CarveEvent>,
}

impl ChannelObserver {
    pub fn new(sender: Sender<CarveEvent>) -> Self {
        ChannelObserver { sender }
    }

    fn send(&self, event: CarveEvent) {
        if let Err(err) = self.sender.send(event) {
            trace!(event = ?err.into_inner(), "no one is listening");
        }
    }
}

/// An unbounded channel with the observer end already wrapped.
pub fn event_channel() -> (ChannelObserver, Receiver<CarveEvent>) {
    let (sender, receiver) = channel::unbounded();
    (ChannelObserver::new(sender), receiver)
}

impl CarveObserver for ChannelObserver {
    fn image_changed(&mut self, image: &RgbImage) {
        let (width, height) = image.dimensions();
        self.send(CarveEvent::ImageChanged { width, height });
    }

    fn operation_completed(&mut self, outcome: Result<(), &CarveError>) {
        self.send(CarveEvent::OperationCompleted {
            error: outcome.err().map(|err| err.to_string()),
        });
    }

    fn seam_highlighted(&mut self, points: &[(u32, u32)]) {
        self.send(CarveEvent::SeamHighlighted(points.to_vec()));
    }
}

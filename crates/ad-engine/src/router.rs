//! Hit routing
//!
//! Runs inline on the hit listener thread. The zone is read from the board
//! at the moment the hit arrives, not when the stroke started; the two are
//! close enough in practice and this keeps the listener free of any
//! frame-level state.

use std::sync::Arc;

use ad_audio::AudioDispatcher;
use ad_core::{DrumVoice, HitSource};
use ad_net::HitSink;

use crate::EngineContext;

pub struct HitRouter {
    context: Arc<EngineContext>,
    dispatcher: AudioDispatcher,
}

impl HitRouter {
    pub fn new(context: Arc<EngineContext>, dispatcher: AudioDispatcher) -> Self {
        Self {
            context,
            dispatcher,
        }
    }

    /// Drum voice a hit from `source` plays right now
    pub fn resolve(&self, source: HitSource) -> DrumVoice {
        match source.limb() {
            Some(limb) => DrumVoice::from(self.context.zones.zone(limb)),
            None => DrumVoice::Kick,
        }
    }
}

impl HitSink for HitRouter {
    fn on_hit(&self, source: HitSource) {
        let voice = self.resolve(source);
        if !self.dispatcher.trigger(voice) {
            log::trace!("[HitRouter] {} -> {} has no sample", source.tag(), voice);
        }
    }
}

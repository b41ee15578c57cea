use async_trait::async_trait;

use crate::events::Event;
use crate::subscribers::Subscribe;

/// Silent sink.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

#[async_trait]
impl Subscribe for Discard {
    async fn on_event(&self, _event: &Event) {}

    fn name(&self) -> &'static str {
        "Discard"
    }
}

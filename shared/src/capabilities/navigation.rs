use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use crate::router::Route;

/// Asks the shell to change the current location. The shell does not report
/// back; the core already knows where it is going.
#[derive(Clone)]
pub struct Navigator<E> {
    context: CapabilityContext<NavigationOperation, E>,
}

impl<Ev> Capability<Ev> for Navigator<Ev> {
    type Operation = NavigationOperation;
    type MappedSelf<MappedEv> = Navigator<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Navigator::new(self.context.map_event(f))
    }
}

impl<E> Navigator<E>
where
    E: Send + 'static,
{
    pub fn new(context: CapabilityContext<NavigationOperation, E>) -> Self {
        Self { context }
    }

    pub fn push(&self, route: Route) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(NavigationOperation::Push {
                path: route.path().to_string(),
            })
            .await;
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "data")]
pub enum NavigationOperation {
    Push { path: String },
}

impl Operation for NavigationOperation {
    type Output = ();
}

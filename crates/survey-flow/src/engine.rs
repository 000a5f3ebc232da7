use serde::Serialize;

use crate::answers::AnswerStore;
use crate::cursor::Cursor;
use crate::flow::{ActivePositions, FlowResolver};
use crate::piping::PipingResolver;
use crate::respondent::RespondentMetadata;
use crate::spec::{Catalog, RoutingPolicy};

/// Everything derived from one answer state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub catalog: Catalog,
    pub active: ActivePositions,
    pub terminated: bool,
    /// Cursor re-located by question id and moved onto an active position.
    #[serde(skip)]
    pub cursor: Cursor,
}

impl Resolution {
    pub fn current_id(&self) -> Option<&str> {
        self.catalog
            .get(self.cursor.position())
            .map(|question| question.id.as_str())
    }
}

/// Pipes the template, then resolves the flow. Call after every mutation.
///
/// `current_id` keeps the cursor on the same question when generated
/// questions shift catalog positions; a terminated flow moves the cursor
/// onto the terminal question and a reversed termination moves it back to
/// the screening question.
pub fn recompute(
    piping: &mut PipingResolver,
    routing: &RoutingPolicy,
    template: &Catalog,
    answers: &AnswerStore,
    respondent: &RespondentMetadata,
    cursor: Cursor,
    current_id: Option<&str>,
) -> Resolution {
    let catalog = piping.resolve(template, answers, respondent);
    let mut position = current_id
        .and_then(|id| catalog.position(id))
        .unwrap_or(cursor.position());
    let resolver = FlowResolver::new(routing);
    let mut flow = resolver.resolve(&catalog, answers, respondent, position);

    // A cursor left on the terminal keeps it admitted; once screening passes
    // again the respondent resumes at the screening question.
    let on_terminal = catalog
        .get(position)
        .is_some_and(|question| question.id == routing.terminal);
    if !flow.terminated && on_terminal {
        let unanchored = resolver.resolve(&catalog, answers, respondent, catalog.len());
        if !unanchored.active.contains(position) {
            position = routing
                .screening
                .as_ref()
                .and_then(|rule| catalog.position(&rule.question_id))
                .unwrap_or(0);
            flow = resolver.resolve(&catalog, answers, respondent, position);
        }
    }

    let mut cursor = Cursor::at(position);
    cursor.snap(&flow.active);
    Resolution {
        catalog,
        active: flow.active,
        terminated: flow.terminated,
        cursor,
    }
}

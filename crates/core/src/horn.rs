//! Angluin's HORN1 driven by the approximate equivalence oracle.
//!
//! Borchmann, Hanika & Obiedkov's adaptation for implication bases: each
//! counterexample either narrows the conclusions it violates, refines the
//! first implication whose restricted premise is not closed, or enters the
//! hypothesis as a fresh `C -> M` implication.

use rand::Rng;
use tracing::trace;

use crate::fca::{narrow_conclusions, violated_by, Basis, FormalContext, Implication};
use crate::oracle::{Answer, ApproxEquivalence};

/// Run HORN1 against the given equivalence oracle and return the cleaned
/// hypothesis.
pub fn horn1<R: Rng>(context: &FormalContext, oracle: &mut ApproxEquivalence<R>) -> Basis {
    let mut basis = Basis::new();

    loop {
        let counterexample = match oracle.query(&basis) {
            Answer::Equivalent => break,
            Answer::Counterexample(c) => c,
        };

        let violated = violated_by(&basis, &counterexample);
        if !violated.is_empty() {
            trace!(violated = violated.len(), "narrowing violated conclusions");
            basis = narrow_conclusions(&basis, &violated, &counterexample);
        } else if let Some(imp) = context.find_non_member(&basis, &counterexample) {
            trace!("refining premise of {:?}", imp.premise);
            basis.remove(&imp);
            let premise: Vec<String> = imp
                .premise
                .iter()
                .filter(|a| counterexample.contains(*a))
                .cloned()
                .collect();
            let conclusion: Vec<String> = imp
                .conclusion
                .iter()
                .cloned()
                .chain(
                    imp.premise
                        .iter()
                        .filter(|a| !counterexample.contains(*a))
                        .cloned(),
                )
                .collect();
            basis.insert(Implication::new(premise, conclusion));
        } else {
            trace!("adopting counterexample as a new implication");
            basis.insert(Implication::new(
                counterexample.iter().cloned(),
                context.attributes(),
            ));
        }

        for (i, imp) in basis.iter().enumerate() {
            trace!(
                "hypothesis {} : {} attributes -> {} attributes",
                i + 1,
                imp.premise.len(),
                imp.conclusion.len()
            );
        }
    }

    context.clean_hypothesis(&basis)
}

/// HORN1 wired to the approximate equivalence oracle with the given PAC
/// parameters.
pub fn pac_basis<R: Rng>(
    context: &FormalContext,
    epsilon: f64,
    delta: f64,
    rng: R,
) -> Basis {
    let mut oracle = ApproxEquivalence::new(context, epsilon, delta, rng);
    horn1(context, &mut oracle)
}

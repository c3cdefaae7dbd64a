use tracing::{debug, trace};

use crate::decision::{Decision, Outcome, Rejection, RuleTrace};
use crate::directive::Directive;
use crate::rule::Verdict;

impl Directive {
    /// Evaluate `target` against this directive's rules in order.
    ///
    /// The first decisive rule wins: a permit ends evaluation, and so does
    /// any rejection (a malformed target, a prefix length outside an IP
    /// rule's window, or a deny). Rules that do not apply are skipped; if
    /// none decides, the target is rejected with
    /// [`Rejection::NoMatchingRule`].
    pub fn evaluate(&self, target: &str) -> Decision {
        debug!(directive = self.id(), target, "evaluating target against directive");

        let mut trace = Vec::with_capacity(self.rules().len());

        for (index, rule) in self.rules().iter().enumerate() {
            let verdict = rule.evaluate(target);
            let passed = match &verdict {
                Verdict::Permit => Some(true),
                Verdict::Reject(_) => Some(false),
                Verdict::Inconclusive => None,
            };
            trace.push(RuleTrace {
                index,
                kind: rule.kind(),
                passed,
            });

            match verdict {
                Verdict::Permit => {
                    trace!(directive = self.id(), rule = index, "rule permitted target");
                    return self.decision(Outcome::Permitted { rule: index }, trace);
                }
                Verdict::Reject(rejection) => {
                    trace!(
                        directive = self.id(),
                        rule = index,
                        reason = rejection.code(),
                        "rule rejected target"
                    );
                    return self.decision(Outcome::Rejected(rejection), trace);
                }
                Verdict::Inconclusive => continue,
            }
        }

        self.decision(
            Outcome::Rejected(Rejection::NoMatchingRule {
                target: target.to_string(),
            }),
            trace,
        )
    }

    fn decision(&self, outcome: Outcome, trace: Vec<RuleTrace>) -> Decision {
        debug!(directive = self.id(), ?outcome, "directive decision");
        Decision {
            directive: self.id().to_string(),
            outcome,
            trace,
        }
    }
}

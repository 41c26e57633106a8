pub mod container;
pub mod locator;
pub mod ranker;
pub mod strategy;

pub use container::{common_container, section_controls};
pub use locator::{css_selector, xpath};
pub use ranker::rank;
pub use strategy::{Candidate, CandidateGenerator, Descriptor, Strategy, StrategyContext};

use crate::dom::Dom;

/// Descriptor-to-element resolution over one snapshot.
pub struct FieldResolver {
    generator: CandidateGenerator,
    max_section_children: usize,
}

impl FieldResolver {
    pub fn new(max_section_children: usize) -> Self {
        Self {
            generator: CandidateGenerator::default(),
            max_section_children,
        }
    }

    pub fn with_generator(generator: CandidateGenerator, max_section_children: usize) -> Self {
        Self {
            generator,
            max_section_children,
        }
    }

    /// All candidates for `text`, unranked, in proposal order.
    pub fn candidates(&self, dom: &Dom, text: &str) -> Vec<Candidate> {
        let descriptor = Descriptor::new(text);
        let ctx = StrategyContext {
            dom,
            descriptor: &descriptor,
            max_section_children: self.max_section_children,
        };
        self.generator.generate(&ctx)
    }

    /// The winning candidate for `text`, if any.
    pub fn resolve(&self, dom: &Dom, text: &str) -> Option<Candidate> {
        rank(self.candidates(dom, text))
    }
}

impl Default for FieldResolver {
    fn default() -> Self {
        Self::new(container::DEFAULT_MAX_SECTION_CHILDREN)
    }
}

//! Per-element style resolution over a whole tree.

use std::collections::HashMap;
use std::hash::Hash;

use css::PseudoElement;
use cssom::{Cssom, DeclarationBlock, SheetId};
use dom::{ElementTree, StyleCache};

use crate::cascade::{cascade, collect_matching_rules};
use crate::computed::{ComputeContext, ComputedStyle, LayoutProvider, compute};
use crate::media::MediaEnvironment;

/// Memo table keyed by element and pseudo-element.
pub type ComputedCache<E> = StyleCache<(E, Option<PseudoElement>), ComputedStyle>;

/// Borrowed view of everything that feeds `getComputedStyle`.
pub struct StyleResolver<'a, T: ElementTree, L: ?Sized> {
    pub cssom: &'a Cssom,
    /// Applicable sheets in document order, user-agent sheet first.
    pub sheets: &'a [SheetId],
    pub tree: &'a T,
    pub env: &'a MediaEnvironment,
    pub layout: &'a L,
    pub inline: &'a HashMap<T::Element, DeclarationBlock>,
}

impl<'a, T, L> StyleResolver<'a, T, L>
where
    T: ElementTree,
    T::Element: Hash + Eq,
    L: LayoutProvider<T::Element> + ?Sized,
{
    pub fn new(
        cssom: &'a Cssom,
        sheets: &'a [SheetId],
        tree: &'a T,
        env: &'a MediaEnvironment,
        layout: &'a L,
        inline: &'a HashMap<T::Element, DeclarationBlock>,
    ) -> Self {
        Self {
            cssom,
            sheets,
            tree,
            env,
            layout,
            inline,
        }
    }

    /// Style of `element` (or one of its pseudo-elements), computing and
    /// caching every ancestor on the way down.
    pub fn compute(
        &self,
        element: T::Element,
        pseudo: Option<PseudoElement>,
        cache: &mut ComputedCache<T::Element>,
    ) -> ComputedStyle {
        let mut chain = vec![element];
        let mut current = element;
        while let Some(parent) = self.tree.parent_element(current) {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();

        let mut root_font_size = self.env.root_font_size;
        let mut parent: Option<ComputedStyle> = None;
        for (depth, &el) in chain.iter().enumerate() {
            let style = match cache.get(&(el, None)) {
                Some(style) => style.clone(),
                None => {
                    let style = self.compute_one(el, None, parent.as_ref(), root_font_size);
                    cache.insert((el, None), style.clone());
                    style
                }
            };
            if depth == 0 {
                root_font_size = style.font_size_px();
            }
            parent = Some(style);
        }

        let Some(pseudo) = pseudo else {
            return parent.unwrap_or_default();
        };
        if let Some(style) = cache.get(&(element, Some(pseudo))) {
            return style.clone();
        }
        let style = self.compute_one(element, Some(pseudo), parent.as_ref(), root_font_size);
        cache.insert((element, Some(pseudo)), style.clone());
        style
    }

    /// One element given its parent's computed style. Pseudo-elements
    /// inherit from their originating element and take no inline style.
    pub fn compute_one(
        &self,
        element: T::Element,
        pseudo: Option<PseudoElement>,
        parent: Option<&ComputedStyle>,
        root_font_size: f64,
    ) -> ComputedStyle {
        let matched = collect_matching_rules(self.cssom, self.sheets, self.tree, element, pseudo, self.env);
        log::trace!("{element:?} {pseudo:?}: {} matching rules", matched.len());
        let inline = match pseudo {
            None => self.inline.get(&element),
            Some(_) => None,
        };
        let specified = cascade(self.cssom, &matched, inline);
        let root = parent.is_none();
        let ctx = ComputeContext {
            env: self.env,
            parent,
            root_font_size: if root { self.env.root_font_size } else { root_font_size },
            containing_block: self.layout.containing_block(element),
        };
        compute(&specified, &ctx)
    }
}

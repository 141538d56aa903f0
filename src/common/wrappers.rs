//! Zero-cost wrappers for safe indexing.

safe_index! {
    #[doc = "Predicate symbol indices."]
    SymIdx
    #[doc = "Set of predicate symbols."]
    set: SymSet
    #[doc = "Hash map from predicate symbols to something."]
    hmap: SymHMap
    #[doc = "Total map from predicate symbols to something."]
    map: SymMap
}

safe_index! {
    #[doc = "Edge indices. Stable within one graph, not across transformations."]
    EId
    #[doc = "Set of edge indices."]
    set: EIdSet
    #[doc = "Hash map from edge indices to something."]
    hmap: EIdHMap
}

safe_index! {
    #[doc = "Interned variable base symbols (a name and a sort)."]
    VarSym
    #[doc = "Set of variable base symbols."]
    set: VarSymSet
}

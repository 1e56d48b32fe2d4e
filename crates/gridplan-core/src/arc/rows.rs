//! Rows, right-hand sides, bounds and event multipliers owned by an arc.

use super::Arc;
use crate::config::{ModelContext, ResponseSpeed};
use crate::records::{BoundEntry, RhsEntry, RowDecl, RowSense};

impl Arc {
    /// Operating limit rows of this step.
    ///
    /// Transport links without infrastructure own a shared `ub` row that
    /// the flows riding on them fill; it is free when the link is
    /// unbounded. Bounded energy arcs own `ub`, plus the reserve split rows
    /// when they ramp.
    pub fn upper_bound_rows(&self, _ctx: &ModelContext<'_>) -> Vec<RowDecl> {
        let code = self.code();
        let mut rows = Vec::new();
        if self.is_transport() {
            if self.infrastructure.is_none() {
                let sense = if self.op_max.is_some() {
                    RowSense::Less
                } else {
                    RowSense::Free
                };
                rows.push(RowDecl::new(sense, format!("ub{}", code)));
            }
            return rows;
        }
        if self.op_max.is_none() {
            return rows;
        }
        rows.push(RowDecl::new(RowSense::Less, format!("ub{}", code)));
        if self.provides_reserves() {
            rows.push(RowDecl::new(RowSense::Less, format!("ubR{}", code)));
            rows.push(RowDecl::new(RowSense::Greater, format!("lbR{}", code)));
            rows.push(RowDecl::new(RowSense::Less, format!("ubRop{}", code)));
            rows.push(RowDecl::new(RowSense::Less, format!("U1CR{}", code)));
            rows.push(RowDecl::new(RowSense::Less, format!("U2CR{}", code)));
            rows.push(RowDecl::new(RowSense::Less, format!("U1RU{}", code)));
            rows.push(RowDecl::new(RowSense::Less, format!("U1RD{}", code)));
        }
        rows
    }

    /// Yearly ramp headroom limits (`L10`, `LCAP10`, ...).
    pub fn ramp_limit_rows(&self, ctx: &ModelContext<'_>) -> Vec<RowDecl> {
        if !self.provides_reserves() || !self.is_first_in_year(ctx) {
            return Vec::new();
        }
        let code = self.code();
        let mut rows = Vec::with_capacity(6);
        for speed in ResponseSpeed::RAMPS {
            rows.push(RowDecl::new(
                RowSense::Less,
                format!("L{}{}", speed.suffix(), code),
            ));
        }
        for speed in ResponseSpeed::RAMPS {
            rows.push(RowDecl::new(
                RowSense::Less,
                format!("LCAP{}{}", speed.suffix(), code),
            ));
        }
        rows
    }

    /// `inv2cap` row tying capacity to existing capacity plus investments.
    pub fn capacity_rows(&self, ctx: &ModelContext<'_>) -> Vec<RowDecl> {
        if !self.owns_capacity(ctx) {
            return Vec::new();
        }
        vec![RowDecl::new(
            RowSense::Equal,
            format!("inv2cap{}", self.code()),
        )]
    }

    /// DC power-flow row, owned by the first-named direction of the pair.
    pub fn dc_rows(&self, ctx: &ModelContext<'_>) -> Vec<RowDecl> {
        if !self.is_dc_flow(ctx) || self.from >= self.to {
            return Vec::new();
        }
        vec![RowDecl::new(RowSense::Equal, format!("dcpf{}", self.code()))]
    }

    pub fn rhs(&self, ctx: &ModelContext<'_>) -> Vec<RhsEntry> {
        match self.op_max {
            Some(max) if self.owns_capacity(ctx) => {
                vec![RhsEntry::new(format!("inv2cap{}", self.code()), max)]
            }
            _ => Vec::new(),
        }
    }

    /// Minimum operating level of the flow.
    pub fn flow_bounds(&self) -> Vec<BoundEntry> {
        if self.is_transport() || self.op_min == 0.0 {
            return Vec::new();
        }
        vec![BoundEntry::lower(self.code(), self.op_min)]
    }

    pub fn investment_bounds(&self, ctx: &ModelContext<'_>) -> Vec<BoundEntry> {
        if !self.has_investment(ctx) {
            return Vec::new();
        }
        let column = format!("inv{}", self.code());
        let mut bounds = Vec::new();
        if self.inv_min != 0.0 {
            bounds.push(BoundEntry::lower(column.clone(), self.inv_min));
        }
        if let Some(max) = self.inv_max {
            bounds.push(BoundEntry::upper(column, max));
        }
        bounds
    }

    /// Capacity availability under the base case and each event. `None`
    /// for arcs without a capacity variable.
    pub fn event_multipliers(&self, ctx: &ModelContext<'_>) -> Option<Vec<f64>> {
        if !self.owns_capacity(ctx) {
            return None;
        }
        let events = ctx.event_count();
        let mut multipliers = Vec::with_capacity(events + 1);
        multipliers.push(1.0);
        multipliers.extend((0..events).map(|e| self.capacity_loss.get(e).copied().unwrap_or(1.0)));
        Some(multipliers)
    }
}

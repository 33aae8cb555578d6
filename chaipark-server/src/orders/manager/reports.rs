//! Staff dashboard and revenue reports
//!
//! 全部基于 `OrderStore::list_orders` 的时间区间过滤，在内存中聚合。
//! 营收只统计已支付且未取消的订单，按业务时区的自然日分桶。

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::models::MenuCategory;
use shared::order::{
    CategoryRevenue, DailyRevenue, DashboardStats, Order, OrderSummary, PopularItem,
    RevenueReport, RevenueSummary, TodayStats,
};

use super::{ManagerError, ManagerResult, OrdersManager};
use crate::orders::OrderFilter;
use crate::utils::time::{business_date, day_range_utc, day_start_utc};

/// 报表最长跨度 (天)
pub const MAX_REPORT_DAYS: u64 = 366;

const DASHBOARD_POPULAR_ITEMS: usize = 5;
const DASHBOARD_RECENT_ORDERS: usize = 10;
const DASHBOARD_TREND_DAYS: u64 = 7;

impl OrdersManager {
    /// Today's numbers plus the kitchen queue and a 7-day trend (staff)
    pub fn dashboard(&self, now: DateTime<Utc>) -> ManagerResult<DashboardStats> {
        let tz = self.settings.timezone;
        let today = business_date(now, tz);
        let trend_start = today
            .checked_sub_days(Days::new(DASHBOARD_TREND_DAYS - 1))
            .unwrap_or(today);

        let week = self.orders_between(trend_start, today)?;
        let todays: Vec<&Order> = week
            .iter()
            .filter(|o| business_date(o.created_at, tz) == today)
            .collect();

        let (queued, _) = self.orders.list_orders(&OrderFilter::default())?;
        let pending_orders = queued.iter().filter(|o| o.is_in_kitchen_queue()).count() as u64;
        let recent_orders = queued
            .iter()
            .take(DASHBOARD_RECENT_ORDERS)
            .map(OrderSummary::from)
            .collect();

        let mut popular = self.catalog.list_menu_items(None, false)?;
        popular.sort_by(|a, b| b.popularity.cmp(&a.popularity));
        let popular_items = popular
            .into_iter()
            .take(DASHBOARD_POPULAR_ITEMS)
            .map(|item| PopularItem {
                id: item.id,
                name: item.name,
                popularity: item.popularity,
            })
            .collect();

        Ok(DashboardStats {
            today: TodayStats {
                orders: todays.len() as u64,
                revenue: todays
                    .iter()
                    .filter(|o| o.is_paid_revenue())
                    .map(|o| o.pricing.total)
                    .sum(),
            },
            pending_orders,
            popular_items,
            recent_orders,
            weekly_revenue: daily_buckets(&week, trend_start, today, tz),
            average_delivery_minutes: average_delivery_minutes(todays.iter().copied()),
        })
    }

    /// Revenue for business days `start..=end` (admin)
    pub fn revenue_report(&self, start: NaiveDate, end: NaiveDate) -> ManagerResult<RevenueReport> {
        if start > end {
            return Err(ManagerError::Validation(
                "startDate must not be after endDate".to_string(),
            ));
        }
        let span = (end - start).num_days() as u64 + 1;
        if span > MAX_REPORT_DAYS {
            return Err(ManagerError::Validation(format!(
                "Report range must be at most {} days",
                MAX_REPORT_DAYS
            )));
        }

        let tz = self.settings.timezone;
        let orders = self.orders_between(start, end)?;
        let paid: Vec<&Order> = orders.iter().filter(|o| o.is_paid_revenue()).collect();

        let report = RevenueReport {
            start_date: start,
            end_date: end,
            summary: summarize(&paid),
            daily_revenue: daily_buckets(&orders, start, end, tz),
            category_revenue: self.category_revenue(&paid)?,
            average_delivery_minutes: average_delivery_minutes(orders.iter()),
        };

        tracing::debug!(
            start = %start,
            end = %end,
            orders = orders.len(),
            revenue = %report.summary.total_revenue,
            "Revenue report built"
        );
        Ok(report)
    }

    /// Orders created on business days `start..=end`
    fn orders_between(&self, start: NaiveDate, end: NaiveDate) -> ManagerResult<Vec<Order>> {
        let tz = self.settings.timezone;
        let filter = OrderFilter {
            created_from: Some(day_start_utc(start, tz)),
            created_to: Some(day_range_utc(end, tz).1),
            ..Default::default()
        };
        let (orders, _) = self.orders.list_orders(&filter)?;
        Ok(orders)
    }

    /// Line totals grouped by the menu item's current category, largest first
    ///
    /// Lines whose menu item no longer exists are left out.
    fn category_revenue(&self, paid: &[&Order]) -> ManagerResult<Vec<CategoryRevenue>> {
        let mut ids: Vec<String> = paid
            .iter()
            .flat_map(|o| o.items.iter().map(|i| i.menu_item.clone()))
            .collect();
        ids.sort();
        ids.dedup();

        let categories: HashMap<String, MenuCategory> = self
            .catalog
            .find_menu_items(&ids)?
            .into_iter()
            .map(|item| (item.id, item.category))
            .collect();

        let mut buckets: HashMap<MenuCategory, (Decimal, u64)> = HashMap::new();
        for item in paid.iter().flat_map(|o| o.items.iter()) {
            let Some(category) = categories.get(&item.menu_item) else {
                continue;
            };
            let entry = buckets.entry(*category).or_insert((Decimal::ZERO, 0));
            entry.0 += item.total_price;
            entry.1 += u64::from(item.quantity);
        }

        let mut result: Vec<CategoryRevenue> = buckets
            .into_iter()
            .map(|(category, (revenue, quantity))| CategoryRevenue {
                category,
                revenue,
                quantity,
            })
            .collect();
        result.sort_by(|a, b| b.revenue.cmp(&a.revenue).then(b.quantity.cmp(&a.quantity)));
        Ok(result)
    }
}

fn summarize(paid: &[&Order]) -> RevenueSummary {
    let total_revenue: Decimal = paid.iter().map(|o| o.pricing.total).sum();
    let total_orders = paid.len() as u64;
    let average_order_value = if total_orders == 0 {
        Decimal::ZERO
    } else {
        (total_revenue / Decimal::from(total_orders)).round_dp(2)
    };
    RevenueSummary {
        total_revenue,
        total_orders,
        average_order_value,
    }
}

/// One bucket per day in `start..=end`, zero-filled
fn daily_buckets(
    orders: &[Order],
    start: NaiveDate,
    end: NaiveDate,
    tz: chrono_tz::Tz,
) -> Vec<DailyRevenue> {
    let mut days: BTreeMap<NaiveDate, (Decimal, u64)> = start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|d| (d, (Decimal::ZERO, 0)))
        .collect();

    for order in orders.iter().filter(|o| o.is_paid_revenue()) {
        if let Some(entry) = days.get_mut(&business_date(order.created_at, tz)) {
            entry.0 += order.pricing.total;
            entry.1 += 1;
        }
    }

    days.into_iter()
        .map(|(date, (revenue, orders))| DailyRevenue {
            date,
            revenue,
            orders,
        })
        .collect()
}

/// Mean of `duration_minutes` over delivered orders, one decimal place
fn average_delivery_minutes<'a>(orders: impl Iterator<Item = &'a Order>) -> Option<f64> {
    let durations: Vec<i64> = orders.filter_map(Order::duration_minutes).collect();
    if durations.is_empty() {
        return None;
    }
    let mean = durations.iter().sum::<i64>() as f64 / durations.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

//! 数据模型
//!
//! 行结构（FromRow）与 API 视图结构。请求体结构放在各自的 handler 里。

pub mod member;
pub mod planned;
pub mod restaurant;
pub mod schedule;

pub use member::{Member, MemberProfile, MemberRef, NewMember};
pub use planned::{NewPlannedRestaurant, PlannedRestaurantView, PlannedRow};
pub use restaurant::{
    ParticipantRow, RecordVisitData, RestaurantDetail, RestaurantMetadataChanges, RestaurantRow,
    VisitMemberView, VisitRow, VisitView,
};
pub use schedule::{NewSchedule, ScheduleRow, ScheduleView};

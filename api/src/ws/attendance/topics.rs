#[inline]
pub fn attendance_class_topic(class_id: i64) -> String {
    format!("attendance:class:{class_id}")
}

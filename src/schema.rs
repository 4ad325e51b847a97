// Kept in sync by hand with `manager::SCHEMA_SQL`.

diesel::table! {
    attendance (id) {
        id -> Integer,
        student_id -> Integer,
        date -> Date,
        status -> Text,
    }
}

diesel::table! {
    students (id) {
        id -> Integer,
        name -> Text,
        roll_number -> Text,
        department -> Nullable<Text>,
    }
}

diesel::joinable!(attendance -> students (student_id));

diesel::allow_tables_to_appear_in_same_query!(attendance, students);

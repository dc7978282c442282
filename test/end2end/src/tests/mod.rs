mod career_fair_test;
mod cascade_delete_test;
mod debounced_edit_test;
mod dual_write_test;
mod identity_switch_test;

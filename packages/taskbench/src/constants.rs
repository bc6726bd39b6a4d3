pub(crate) const ERR_POISONED_LOCK: &str = "encountered poisoned lock - a task phase panicked \
                                            while holding the task data, so its contents \
                                            cannot be trusted";
